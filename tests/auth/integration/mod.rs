mod test_edge_guard;
mod test_login;
mod test_refresh;
mod test_session_flow;
mod test_user_management;
