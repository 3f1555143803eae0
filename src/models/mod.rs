pub mod household;
pub mod invite;
pub mod membership;
