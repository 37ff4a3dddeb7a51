use std::ops::{Deref, DerefMut};

/// Statement part being rendered.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment {
    #[default]
    None,
    Insert,
    InsertValues,
    Update,
    UpdateSet,
    Delete,
    Select,
    SelectFrom,
    Where,
}

/// Rendering state of one statement.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    /// Placeholders written so far, dialects with numbered parameters (`$1`, `?2`) read it.
    pub placeholders: u32,
    pub fragment: Fragment,
    /// Prefix column names with their table.
    pub qualify_columns: bool,
}

impl Context {
    pub fn new(fragment: Fragment) -> Self {
        Self {
            fragment,
            ..Default::default()
        }
    }

    /// Render a nested part, the placeholders it writes are counted in `self` too.
    pub fn enter(&mut self, fragment: Fragment) -> Nested<'_> {
        Nested {
            current: Context { fragment, ..*self },
            parent: self,
        }
    }
}

pub struct Nested<'a> {
    current: Context,
    parent: &'a mut Context,
}

impl Deref for Nested<'_> {
    type Target = Context;
    fn deref(&self) -> &Context {
        &self.current
    }
}

impl DerefMut for Nested<'_> {
    fn deref_mut(&mut self) -> &mut Context {
        &mut self.current
    }
}

impl Drop for Nested<'_> {
    fn drop(&mut self) {
        self.parent.placeholders = self.current.placeholders;
    }
}
