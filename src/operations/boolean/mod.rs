mod repair;
mod subtract;
mod union;

pub use repair::Repair;
pub use subtract::Subtract;
pub use union::Union;
