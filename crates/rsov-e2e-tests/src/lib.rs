//! End-to-end tests for the lowering pipeline live under `tests/`.
