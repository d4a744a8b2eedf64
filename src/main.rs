// Copyright 2026 the Turbo Eraser Authors
// SPDX-License-Identifier: Apache-2.0

//! Turbo Eraser command line tool

fn main() -> anyhow::Result<()> {
    turbo_eraser::run()
}
