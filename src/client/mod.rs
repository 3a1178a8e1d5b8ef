//! Dashboard side: connection management, routing and a terminal consumer.

pub mod api;
pub mod connector;
pub mod dashboard;
pub mod endpoint;
pub mod router;
pub mod simulation;
pub mod transport;

pub use connector::{Connector, Link, WsConnector};
pub use dashboard::Dashboard;
pub use router::{DashboardSink, EventRouter};
pub use transport::{ClientTransport, ReconnectPolicy, TransportHandle, TransportState};
