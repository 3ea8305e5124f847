//! Mailbox addresses (RFC 5322 §3.4).

/// One mailbox from an address header.
///
/// # Examples
/// - `"Juan García <juan@ejemplo.com>"` → `name = Some("Juan García")`, `address = "juan@ejemplo.com"`
/// - `"user@example.com"` → `name = None`, `address = "user@example.com"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AddressEntry {
    /// The bare email address (`user@domain`). Never empty.
    pub address: String,
    /// Decoded display name, absent when the header supplies none.
    pub name: Option<String>,
}

impl AddressEntry {
    pub fn new(address: impl Into<String>, name: Option<String>) -> Self {
        Self {
            address: address.into(),
            name,
        }
    }

    /// Display name, or `""` when there is none.
    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Format for display: `"Display Name <address>"` or just `"address"`.
    pub fn display(&self) -> String {
        match &self.name {
            Some(name) => format!("{} <{}>", name, self.address),
            None => self.address.clone(),
        }
    }
}

impl std::fmt::Display for AddressEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}
