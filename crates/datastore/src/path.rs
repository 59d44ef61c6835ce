use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Everything except unreserved characters and `/` is escaped; `/` keeps
/// separating folders in paths and nested datacenter names.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// A datastore and the datacenter that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datastore {
    pub name: String,
    pub datacenter: String,
}

impl Datastore {
    pub fn new(name: impl Into<String>, datacenter: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            datacenter: datacenter.into(),
        }
    }

    /// Resolves `path` inside this datastore. See [`resolve_path`].
    pub fn resolve(&self, path: &str) -> String {
        resolve_path(&self.name, &self.datacenter, path)
    }
}

/// Builds the endpoint-relative URI of a datastore file:
/// `/folder/<path>?dcPath=<datacenter>&dsName=<datastore>`.
///
/// All three components are percent-encoded. A leading `/` on `path` is
/// ignored.
pub fn resolve_path(datastore: &str, datacenter: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    format!(
        "/folder/{}?dcPath={}&dsName={}",
        utf8_percent_encode(path, PATH_SEGMENT),
        utf8_percent_encode(datacenter, PATH_SEGMENT),
        utf8_percent_encode(datastore, PATH_SEGMENT),
    )
}
