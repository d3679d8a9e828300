mod state;

pub use state::Dashboard;
