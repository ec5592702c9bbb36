// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! This module contains property-based tests using proptest to verify the
//! propagation laws of streams and models.

mod model_laws;
mod stream_laws;
