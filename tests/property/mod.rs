// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module

mod reconcile_laws;
mod value_objects;
