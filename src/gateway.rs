pub mod events;
pub mod factory;
pub mod logs;
pub mod sns;

#[derive(Debug, PartialEq)]
pub enum GatewayPublisherVia {
    Sns,
    Logs,
}
