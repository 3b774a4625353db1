// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// caviard-geometry — Geometry for the Caviard redaction engine.
//
// Provides the pixel-to-document coordinate transform (preview raster to
// physical page units) and scanline decomposition of freeform polygon regions
// into the axis-aligned rectangle sets the fill primitive accepts.

pub mod mapper;
pub mod scanline;

pub use mapper::CoordinateMapper;
pub use scanline::ScanlineDecomposer;
