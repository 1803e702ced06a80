//! Integration and E2E tests for Folio live under `tests/`.
