//! Record types stored in the keyed hash table

use serde::{Deserialize, Serialize};

/// A record with one designated key field.
///
/// The table reads the key and nothing else; every other attribute is opaque
/// payload.
pub trait Keyed {
    /// The raw, possibly formatted, key
    fn key(&self) -> &str;
}

/// A customer record, the reference payload for the dedup pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub cpf: String,
    pub name: String,
    pub age: u32,
    pub city: String,
}

impl Customer {
    /// Column order used by every tabular export
    pub const COLUMNS: [&'static str; 4] = ["cpf", "name", "age", "city"];

    pub fn new(cpf: impl Into<String>, name: impl Into<String>, age: u32, city: impl Into<String>) -> Self {
        Self {
            cpf: cpf.into(),
            name: name.into(),
            age,
            city: city.into(),
        }
    }
}

impl Keyed for Customer {
    fn key(&self) -> &str {
        &self.cpf
    }
}

impl<T: Keyed + ?Sized> Keyed for &T {
    fn key(&self) -> &str {
        (**self).key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_key() {
        let customer = Customer::new("111.444.777-35", "Cliente_1", 30, "Porto Alegre");
        assert_eq!(customer.key(), "111.444.777-35");
        assert_eq!((&customer).key(), "111.444.777-35");
    }

    #[test]
    fn test_customer_serde_field_order() {
        let customer = Customer::new("11144477735", "Cliente_1", 30, "São Paulo");
        let json = serde_json::to_string(&customer).unwrap();
        assert_eq!(
            json,
            r#"{"cpf":"11144477735","name":"Cliente_1","age":30,"city":"São Paulo"}"#
        );
    }
}
