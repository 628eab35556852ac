use serde::{Deserialize, Serialize};
use std::fmt::{Display, Error, Formatter};
use uuid::Uuid;

/// Identifies one book of accounts: a single owner's holding of a single instrument.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct BookKey {
    pub owner: Uuid,
    pub symbol: String,
}

impl BookKey {
    pub fn new(owner: Uuid, symbol: &str) -> Self {
        Self {
            owner,
            symbol: symbol.to_string(),
        }
    }
}

impl Display for BookKey {
    fn fmt(&self, formatter: &mut Formatter) -> std::result::Result<(), Error> {
        formatter.write_str(&self.owner.to_string())?;
        formatter.write_str(":")?;
        formatter.write_str(&self.symbol)
    }
}
