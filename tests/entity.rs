#[cfg(test)]
mod tests {
    use rivet::{
        CascadeRule, Entity, OperationKind, PrimaryKeyType, Relationship, RowLabeled, Value,
        WhereCondition, WhereDef, validate_cascades, validate_rules,
    };
    use rust_decimal::Decimal;
    use time::Date;
    use uuid::Uuid;

    #[derive(Entity, Default, Debug, PartialEq)]
    struct SomeEntity {
        a: i8,
        b: String,
    }

    #[derive(Entity, Default, Debug, PartialEq)]
    #[rivet(name = "child_rows", schema = "app")]
    #[rivet(where_condition(name = "byParent", columns = ("parent_id")))]
    struct Child {
        #[rivet(primary_key, auto_increment)]
        id: i64,
        parent_id: i64,
    }

    #[derive(Entity, Default, Debug, PartialEq)]
    #[rivet(schema = "app")]
    struct _Parent {
        #[rivet(primary_key)]
        _code: String,
        #[rivet(name = "display_name", unique)]
        label: Option<String>,
        #[rivet(type = "DECIMAL(8, 2)")]
        price: Option<Box<Decimal>>,
        #[rivet(cascade(all, foreign_key = "parent_id"))]
        children: Vec<Child>,
        #[rivet(cascade(update, operation = save, foreign_key = "parent_id"))]
        favorite: Option<Child>,
        #[rivet(ignore)]
        cache: Vec<u64>,
    }

    #[derive(Entity, Debug, PartialEq)]
    #[rivet(name = "measures", primary_key = ("station", "day"))]
    struct Measure {
        station: Uuid,
        day: Date,
        value: f32,
    }

    #[test]
    fn table_and_columns() {
        let table = SomeEntity::table();
        assert_eq!(table.name, "some_entity");
        assert_eq!(table.schema, "");
        let columns = SomeEntity::columns();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].name(), "a");
        assert_eq!(columns[0].table(), "some_entity");
        assert!(matches!(columns[0].value, Value::Int8(None)));
        assert!(!columns[0].nullable);
        assert_eq!(columns[1].name(), "b");
        assert!(matches!(columns[1].value, Value::Varchar(None)));
        assert_eq!(SomeEntity::primary_key_def().count(), 0);
        assert!(SomeEntity::where_defs().is_empty());
        assert!(SomeEntity::cascades().is_empty());

        let table = _Parent::table();
        assert_eq!(table.name, "parent");
        assert_eq!(table.full_name(), "app.parent");
        let columns = _Parent::columns();
        assert_eq!(
            columns.iter().map(|v| v.name()).collect::<Vec<_>>(),
            ["code", "display_name", "price"]
        );
        assert_eq!(columns[0].field, "_code");
        assert_eq!(columns[0].primary_key, PrimaryKeyType::PrimaryKey);
        assert_eq!(columns[0].schema(), "app");
        assert!(columns[1].nullable);
        assert!(columns[1].unique);
        assert_eq!(columns[1].field, "label");
        assert_eq!(columns[2].column_type, "DECIMAL(8, 2)");
        assert!(matches!(columns[2].value, Value::Decimal(None)));
        assert!(columns[2].nullable);

        let columns = Measure::columns();
        assert!(
            columns[..2]
                .iter()
                .all(|v| v.primary_key == PrimaryKeyType::PartOfPrimaryKey && !v.nullable)
        );
        assert_eq!(columns[2].primary_key, PrimaryKeyType::None);
        assert!(matches!(columns[0].value, Value::Uuid(None)));
        assert!(matches!(columns[1].value, Value::Date(None)));
        assert!(matches!(columns[2].value, Value::Float32(None)));

        let columns = Child::columns();
        assert!(columns[0].auto_increment);
        assert!(!columns[1].auto_increment);
    }

    #[test]
    fn where_conditions() {
        assert_eq!(
            Child::where_defs(),
            [WhereDef {
                name: "byParent",
                columns: &["parent_id"],
            }]
        );
        let resolved = WhereCondition::from("byParent")
            .resolve::<Child>()
            .expect("The condition is declared");
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].name(), "parent_id");
        assert_eq!(
            WhereCondition::from("primaryKey"),
            WhereCondition::PrimaryKey
        );
        assert_eq!(WhereCondition::from(""), WhereCondition::All);
        assert!(
            WhereCondition::from("")
                .resolve::<Child>()
                .expect("Every table matches all rows")
                .is_empty()
        );
        assert!(WhereCondition::from("byNothing").resolve::<Child>().is_err());
        assert!(WhereCondition::PrimaryKey.resolve::<SomeEntity>().is_err());
    }

    #[test]
    fn cascade_rules() {
        let rules = _Parent::cascades();
        assert_eq!(
            rules
                .iter()
                .map(|v| (v.field, v.kind, v.operation, v.post))
                .collect::<Vec<_>>(),
            [
                ("children", OperationKind::Select, OperationKind::Select, false),
                ("children", OperationKind::Insert, OperationKind::Insert, true),
                ("children", OperationKind::Update, OperationKind::Update, true),
                ("children", OperationKind::Delete, OperationKind::Delete, false),
                ("favorite", OperationKind::Update, OperationKind::Save, true),
            ]
        );
        assert!(
            rules[..4]
                .iter()
                .all(|v| v.relationship == Relationship::OneToMany)
        );
        assert_eq!(rules[4].relationship, Relationship::OneToOne);
        assert!(rules.iter().all(|v| v.target == Child::table()));
        assert!(rules.iter().all(|v| v.foreign_key == ["parent_id"]));
        validate_cascades::<_Parent>().expect("The parent cascades must be valid");

        let invalid = [CascadeRule {
            field: "children",
            kind: OperationKind::Insert,
            operation: OperationKind::Insert,
            post: true,
            relationship: Relationship::OneToMany,
            target: Child::table(),
            where_condition: None,
            source_parameters: &[],
            foreign_key: &["parent_id", "other_id"],
        }];
        let error = validate_rules(_Parent::table(), 1, &invalid)
            .expect_err("Two foreign key fields for a single column key");
        assert!(format!("{:#}", error).contains("expected 1 foreign key fields, found 2"));
        let duplicated = [invalid[0].clone(), invalid[0].clone()].map(|mut v| {
            v.foreign_key = &["parent_id"];
            v
        });
        assert!(validate_rules(_Parent::table(), 1, &duplicated).is_err());
        let mut save = duplicated[0].clone();
        save.kind = OperationKind::Save;
        assert!(validate_rules(_Parent::table(), 1, &[save]).is_err());
        let mut select = duplicated[0].clone();
        select.operation = OperationKind::Select;
        assert!(validate_rules(_Parent::table(), 1, &[select]).is_err());
    }

    #[test]
    fn field_access() {
        let mut parent = _Parent {
            _code: "P1".into(),
            label: Some("first".into()),
            ..Default::default()
        };
        assert_eq!(
            parent.get_field("_code").expect("Field name"),
            Value::Varchar(Some("P1".into()))
        );
        assert_eq!(
            parent.get_field("code").expect("Column name"),
            Value::Varchar(Some("P1".into()))
        );
        assert_eq!(
            parent.get_field("display_name").expect("Column name"),
            Value::Varchar(Some("first".into()))
        );
        assert_eq!(parent.get_field("price").expect("Null"), Value::Decimal(None));
        assert!(parent.get_field("children").is_err());
        assert!(parent.get_field("cache").is_err());

        parent
            .set_field("price", Value::Varchar(Some("12.50".into())))
            .expect("Text converts to decimal");
        assert_eq!(parent.price, Some(Box::new(Decimal::new(1_250, 2))));
        parent
            .set_field("label", Value::Null)
            .expect("Null clears an optional field");
        assert_eq!(parent.label, None);
        assert!(parent.set_field("_code", Value::Null).is_err());

        assert_eq!(
            parent.row().expect("Every column is readable").into_vec(),
            [
                Value::Varchar(Some("P1".into())),
                Value::Varchar(None),
                Value::Decimal(Some(Decimal::new(1_250, 2))),
            ]
        );
        assert_eq!(
            parent.primary_key().expect("The key is readable").into_vec(),
            [Value::Varchar(Some("P1".into()))]
        );
    }

    #[test]
    fn from_row() {
        let parent = _Parent::from_row(RowLabeled::new(
            ["code".to_string(), "extra".to_string()].into(),
            [
                Value::Varchar(Some("P2".into())),
                Value::Int64(Some(1)),
            ]
            .into(),
        ))
        .expect("Rows with a default can be partial");
        assert_eq!(parent._code, "P2");
        assert_eq!(parent.label, None);
        assert!(parent.children.is_empty());

        let station = Uuid::parse_str("5e915574-bb30-4430-98cf-c5854f61fbbd").expect("Valid uuid");
        let measure = Measure::from_row(RowLabeled::new(
            ["value".to_string(), "day".to_string(), "station".to_string()].into(),
            [
                Value::Float64(Some(2.5)),
                Value::Varchar(Some("2025-01-31".into())),
                Value::Varchar(Some(station.to_string())),
            ]
            .into(),
        ))
        .expect("Every column is present");
        assert_eq!(
            measure,
            Measure {
                station,
                day: Date::from_calendar_date(2025, time::Month::January, 31)
                    .expect("Valid date"),
                value: 2.5,
            }
        );

        let error = Measure::from_row(RowLabeled::new(
            ["station".to_string()].into(),
            [Value::Uuid(Some(station))].into(),
        ))
        .expect_err("The other columns are missing");
        assert!(format!("{:#}", error).contains("Column `day` of `Measure` is missing"));
        assert!(
            Measure::from_row(RowLabeled::new(
                ["station".to_string(), "day".to_string(), "value".to_string()].into(),
                [
                    Value::Uuid(Some(station)),
                    Value::Varchar(Some("not a date".into())),
                    Value::Float32(Some(1.0)),
                ]
                .into(),
            ))
            .is_err()
        );
    }
}
