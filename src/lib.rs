#[allow(non_snake_case)]
pub mod Network;
#[allow(non_snake_case)]
pub mod Notation;
#[allow(non_snake_case)]
pub mod Utils;
