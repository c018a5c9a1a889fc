pub mod wayfire_shell;
