pub mod bitflag;
pub mod descriptor;
pub mod record;
