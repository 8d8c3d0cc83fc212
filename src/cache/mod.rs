// In-memory caching of derived values.
// Backs the memoized properties of the organization client.

pub mod memo;

pub use memo::Memo;
