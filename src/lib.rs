pub mod config {
    pub mod settings;
}
pub mod middleware {
    pub mod metrics;
    pub mod path_logger;
}
pub mod routes {
    pub mod health;
    pub mod monitor;
}
pub mod services {
    pub mod orders {
        pub mod api;
        pub mod client;
        pub mod models;
        pub mod normalize;

        pub use api::OrderApi;
        pub use client::BackendClient;
        pub use models::{Action, EntryPrice, Instrument, MarketDepth, Order, PositionPnl};
    }
    pub mod pnl;
    pub mod poller;
}

pub mod utils {
    pub mod errors;
    pub mod types;
}
