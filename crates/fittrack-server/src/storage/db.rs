//! Server database handle.

fittrack_core::define_database!(ServerDatabase);
