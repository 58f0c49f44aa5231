//! Integration tests.
//!
//! All suites are ignored by default: `api_tests` needs a running server
//! started with `BUSPASS_SERVER__TRUSTED_PROXIES=127.0.0.1,::1`,
//! `seat_accounting` needs a disposable Postgres database in `DATABASE_URL`
//! and `rate_limit` a Redis instance in `REDIS_URL`.
//! Run with: cargo test --test integration -- --ignored --test-threads=1

mod api_tests;
mod rate_limit;
mod seat_accounting;
