// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubeconfig generation for discovered clusters.

pub mod assembler;
pub mod sink;

pub use assembler::build_triple;
pub use sink::{ConfigSink, KubeconfigFileSink};
