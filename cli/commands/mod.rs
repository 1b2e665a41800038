pub mod completion;
pub mod pack;
