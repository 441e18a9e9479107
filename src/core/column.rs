use super::data_type::DataType;
use super::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub not_null: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub default: Option<Value>,
    pub autoincrement: bool,
}

impl Column {
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        let autoincrement = data_type == DataType::Serial;
        Self {
            name: name.into(),
            data_type,
            not_null: autoincrement,
            primary_key: false,
            unique: false,
            default: None,
            autoincrement,
        }
    }

    /// Primary keys are implicitly unique and NOT NULL.
    #[must_use]
    pub const fn is_unique(&self) -> bool {
        self.unique || self.primary_key
    }

    #[must_use]
    pub const fn is_not_null(&self) -> bool {
        self.not_null || self.primary_key
    }
}
