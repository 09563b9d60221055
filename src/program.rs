use std::fmt::Display;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::memory::Value;

/// An Intcode program: the initial contents of memory, starting at address 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub data: Vec<Value>,
}

impl Program {
    pub fn new(data: Vec<Value>) -> Self {
        Self { data }
    }

    /// Parses comma-separated, optionally signed decimal integers.
    pub fn parse(text: &str) -> Result<Self> {
        text.trim()
            .split(',')
            .enumerate()
            .map(|(index, token)| {
                let token = token.trim();
                token.parse::<Value>().map_err(|source| Error::MalformedProgram {
                    index,
                    token: token.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Self::new)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<Vec<Value>> for Program {
    fn from(data: Vec<Value>) -> Self {
        Self::new(data)
    }
}

impl FromStr for Program {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (index, value) in self.data.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", value)?;
        }
        Ok(())
    }
}
