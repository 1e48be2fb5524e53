pub(crate) mod prefix;
pub(crate) mod table;
