mod waiter;

pub use waiter::wait_for_awake_status;
