use crate::{Entity, Relationship, Result};

/// Typed get/set access to one field of a row, used for relationship fields.
pub struct FieldAccessor<S, F> {
    pub name: &'static str,
    pub get: fn(&S) -> &F,
    pub get_mut: fn(&mut S) -> &mut F,
}

impl<S, F> FieldAccessor<S, F> {
    pub const fn new(name: &'static str, get: fn(&S) -> &F, get_mut: fn(&mut S) -> &mut F) -> Self {
        Self { name, get, get_mut }
    }
    pub fn get<'s>(&self, source: &'s S) -> &'s F {
        (self.get)(source)
    }
    pub fn get_mut<'s>(&self, source: &'s mut S) -> &'s mut F {
        (self.get_mut)(source)
    }
}

impl<S, F> Clone for FieldAccessor<S, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, F> Copy for FieldAccessor<S, F> {}

/// Field type holding the rows of a relationship.
///
/// `Vec<T>` is a one-to-many relationship, `Option<T>` a one-to-one.
pub trait Related: Default + Send + Sync {
    type Row: Entity;
    const RELATIONSHIP: Relationship;

    fn rows_mut(&mut self) -> impl Iterator<Item = &mut Self::Row> + Send;
    /// Store the rows loaded by a select cascade.
    fn replace(&mut self, rows: Vec<Self::Row>) -> Result<()>;
}

impl<T: Entity> Related for Vec<T> {
    type Row = T;
    const RELATIONSHIP: Relationship = Relationship::OneToMany;

    fn rows_mut(&mut self) -> impl Iterator<Item = &mut T> + Send {
        self.iter_mut()
    }
    fn replace(&mut self, rows: Vec<T>) -> Result<()> {
        *self = rows;
        Ok(())
    }
}

impl<T: Entity> Related for Option<T> {
    type Row = T;
    const RELATIONSHIP: Relationship = Relationship::OneToOne;

    fn rows_mut(&mut self) -> impl Iterator<Item = &mut T> + Send {
        self.iter_mut()
    }
    fn replace(&mut self, rows: Vec<T>) -> Result<()> {
        if rows.len() > 1 {
            log::warn!(
                "One to one relationship with `{}` matched {} rows, keeping the first one",
                T::table(),
                rows.len()
            );
        }
        *self = rows.into_iter().next();
        Ok(())
    }
}
