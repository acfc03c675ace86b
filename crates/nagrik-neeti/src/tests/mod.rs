mod common;

mod candidates;
mod idempotence;
mod routing;
