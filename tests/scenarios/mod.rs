//! End-to-end scenarios over composed flows

mod builtin_flow;
mod dispatch_order;
mod logger_cascade;
mod loop_termination;
mod supervisor_retry;
