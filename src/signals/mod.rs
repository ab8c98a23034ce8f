mod store;

pub use store::SignalStore;
