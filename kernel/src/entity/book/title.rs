use vodca::{AsRefln, Fromln};

#[derive(Debug, Clone, Eq, PartialEq, Fromln, AsRefln)]
pub struct BookTitle(String);

impl BookTitle {
    pub fn new(title: impl Into<String>) -> Self {
        Self(title.into())
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Fromln, AsRefln)]
pub struct BookAuthor(String);

impl BookAuthor {
    pub fn new(author: impl Into<String>) -> Self {
        Self(author.into())
    }
}
