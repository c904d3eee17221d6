pub mod company;
pub mod conversation;
pub mod product;
pub mod supplier;
