mod config_load;
mod handoff_loop;
mod lifecycle;
mod scenarios;
