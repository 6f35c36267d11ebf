/// Record set(s) a column is copied into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Client,
    Server,
    Both,
    Neither,
}

impl Route {
    /// Interprets a routing tag. An empty tag, or one containing `cs` or
    /// `sc`, routes to both sides; the combined checks run first because
    /// they also contain the single letters.
    pub fn from_tag(tag: &str) -> Self {
        if tag.is_empty() || tag.contains("cs") || tag.contains("sc") {
            Route::Both
        } else if tag.contains('c') {
            Route::Client
        } else if tag.contains('s') {
            Route::Server
        } else {
            Route::Neither
        }
    }

    pub fn to_client(self) -> bool {
        matches!(self, Route::Client | Route::Both)
    }

    pub fn to_server(self) -> bool {
        matches!(self, Route::Server | Route::Both)
    }
}
