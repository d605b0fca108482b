//! Email secondary channel.
//!
//! Forwards notifications for offline users to the mailer process over the
//! broker. The mailer subscribes to `<namespace>:email:channel:*` and
//! decides how to batch and render them.

mod broker_channel;

pub use broker_channel::BrokerSecondaryChannel;
