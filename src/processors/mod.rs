// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod observed;
pub mod routing;
pub mod simple;
pub mod stateful;

pub use observed::ObservedProcessor;
pub use routing::{OnlyTag, SeverityTagger, SnakeCase, Terminal};
pub use simple::{lowercase, uppercase, FanOutFnProcessor, SimpleFnProcessor};
pub use stateful::{FilterCriterion, FilterProcessor, LineCounter, LineJoiner, LineSplitter, TagRouter};
