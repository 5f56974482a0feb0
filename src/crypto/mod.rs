pub mod jwt;
pub mod signature;

pub use jwt::{ Claims, JwtManager };
