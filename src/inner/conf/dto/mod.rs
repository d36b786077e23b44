pub(crate) mod link_configuration;
