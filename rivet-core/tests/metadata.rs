#[cfg(test)]
mod tests {
    use rivet_core::{
        AsValue, CascadeRule, ColumnDef, ColumnRef, Entity, Error, OperationKind,
        PrimaryKeyType, Relationship, Result, RowLabeled, TableRef, Value, WhereCondition,
        WhereDef, insert_columns, update_columns, validate_cascades, validate_rules,
    };
    use std::sync::LazyLock;

    #[derive(Default, Debug, PartialEq)]
    struct Contact {
        id: i64,
        name: String,
        email: Option<String>,
    }

    static CONTACT_TABLE: TableRef = TableRef::new("contact", "");
    static NOTE_TABLE: TableRef = TableRef::new("note", "");

    fn column(name: &'static str, value: Value, primary_key: bool) -> ColumnDef {
        ColumnDef {
            column_ref: ColumnRef {
                name,
                table: "contact",
                schema: "",
            },
            field: name,
            value,
            primary_key: if primary_key {
                PrimaryKeyType::PrimaryKey
            } else {
                PrimaryKeyType::None
            },
            auto_increment: primary_key,
            ..Default::default()
        }
    }

    static CONTACT_COLUMNS: LazyLock<Vec<ColumnDef>> = LazyLock::new(|| {
        vec![
            column("id", Value::Int64(None), true),
            column("name", Value::Varchar(None), false),
            ColumnDef {
                nullable: true,
                ..column("email", Value::Varchar(None), false)
            },
        ]
    });

    static CONTACT_WHERE: [WhereDef; 1] = [WhereDef {
        name: "byEmail",
        columns: &["email"],
    }];

    static CONTACT_CASCADES: LazyLock<Vec<CascadeRule>> = LazyLock::new(|| {
        vec![
            rule(OperationKind::Insert, OperationKind::Insert),
            rule(OperationKind::Update, OperationKind::Save),
            rule(OperationKind::Select, OperationKind::Select),
        ]
    });

    fn rule(kind: OperationKind, operation: OperationKind) -> CascadeRule {
        CascadeRule {
            field: "notes",
            kind,
            operation,
            post: true,
            relationship: Relationship::OneToMany,
            target: &NOTE_TABLE,
            where_condition: None,
            source_parameters: &[],
            foreign_key: &["contact_id"],
        }
    }

    impl Entity for Contact {
        fn table() -> &'static TableRef {
            &CONTACT_TABLE
        }
        fn columns() -> &'static [ColumnDef] {
            &CONTACT_COLUMNS
        }
        fn where_defs() -> &'static [WhereDef] {
            &CONTACT_WHERE
        }
        fn cascades() -> &'static [CascadeRule] {
            &CONTACT_CASCADES
        }
        fn from_row(row: RowLabeled) -> Result<Self> {
            let mut result = Contact::default();
            for (label, value) in row.labels.iter().zip(row.values.into_iter()) {
                result.set_field(label, value)?;
            }
            Ok(result)
        }
        fn get_field(&self, name: &str) -> Result<Value> {
            Ok(match name {
                "id" => self.id.as_value(),
                "name" => self.name.clone().as_value(),
                "email" => self.email.clone().as_value(),
                _ => return Err(Error::msg(format!("Unknown field `{}`", name))),
            })
        }
        fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
            match name {
                "id" => self.id = AsValue::try_from_value(value)?,
                "name" => self.name = AsValue::try_from_value(value)?,
                "email" => self.email = AsValue::try_from_value(value)?,
                _ => return Err(Error::msg(format!("Unknown field `{}`", name))),
            }
            Ok(())
        }
    }

    #[test]
    fn statement_columns() {
        let names = |columns: Vec<&ColumnDef>| columns.iter().map(|c| c.name()).collect::<Vec<_>>();
        assert_eq!(names(insert_columns::<Contact>()), ["name", "email"]);
        assert_eq!(names(update_columns::<Contact>()), ["name", "email"]);
        assert_eq!(
            Contact::primary_key_def().map(|c| c.name()).collect::<Vec<_>>(),
            ["id"]
        );
    }

    #[test]
    fn where_conditions() {
        let names = |condition: WhereCondition| {
            condition
                .resolve::<Contact>()
                .map(|v| v.iter().map(|c| c.name()).collect::<Vec<_>>())
        };
        assert_eq!(names("primaryKey".into()).unwrap(), ["id"]);
        assert!(names("".into()).unwrap().is_empty());
        assert_eq!(names("byEmail".into()).unwrap(), ["email"]);
        assert_eq!(names(WhereCondition::Columns(&["name", "id"])).unwrap(), ["name", "id"]);
        let error = names("byPhone".into()).unwrap_err();
        assert!(format!("{error}").contains("byPhone"));
        assert!(names(WhereCondition::Columns(&["phone"])).is_err());
    }

    #[test]
    fn row_and_key() {
        let mut contact = Contact {
            id: 5,
            name: "Ada".into(),
            email: None,
        };
        assert_eq!(
            contact.row().unwrap().as_ref(),
            [
                Value::Int64(Some(5)),
                Value::Varchar(Some("Ada".into())),
                Value::Varchar(None)
            ]
        );
        assert_eq!(contact.primary_key().unwrap().as_ref(), [Value::Int64(Some(5))]);
        contact.set_field("id", Value::Int32(Some(9))).unwrap();
        assert_eq!(contact.id, 9);
        assert!(contact.set_field("name", Value::Null).is_err());
        let row = RowLabeled::new(
            ["id".to_string(), "name".to_string(), "email".to_string()].into(),
            [
                Value::Int64(Some(1)),
                Value::Varchar(Some("Bob".into())),
                Value::Null,
            ]
            .into(),
        );
        assert_eq!(
            Contact::from_row(row).unwrap(),
            Contact {
                id: 1,
                name: "Bob".into(),
                email: None
            }
        );
    }

    #[test]
    fn cascade_validation() {
        assert!(validate_cascades::<Contact>().is_ok());
        let duplicate = [
            rule(OperationKind::Insert, OperationKind::Insert),
            rule(OperationKind::Insert, OperationKind::Save),
        ];
        let error = validate_rules(&CONTACT_TABLE, 1, &duplicate).unwrap_err();
        assert!(format!("{error}").contains("already has a insert cascade"));
        let save_trigger = [rule(OperationKind::Save, OperationKind::Save)];
        assert!(validate_rules(&CONTACT_TABLE, 1, &save_trigger).is_err());
        let select_mismatch = [rule(OperationKind::Select, OperationKind::Insert)];
        assert!(validate_rules(&CONTACT_TABLE, 1, &select_mismatch).is_err());
        let composite_key = [rule(OperationKind::Insert, OperationKind::Insert)];
        assert!(validate_rules(&CONTACT_TABLE, 2, &composite_key).is_err());
    }
}
