mod test_guard_properties;
mod test_token_properties;
