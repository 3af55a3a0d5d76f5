//! Data transforms behind the environmental sensor dashboard
//!
//! This crate loads sensor readings, filters statistical outliers and shapes
//! the result into chart descriptions and downloadable tables. Every operation
//! is a pure function of its inputs; the source table is loaded once and never
//! modified.
//!
//! # Overview
//!
//! One dashboard interaction runs the following steps:
//!
//! 1. **Load Readings** ([`table::SensorTable`]): Parse the delimited readings file
//! 2. **Filter Outliers** ([`filter::OutlierFilter`]): Optionally null out extreme values
//!    of the selected parameter (IQR, standard deviation or z-score rule)
//! 3. **Build Graph** ([`graph::build_graph`]): Round timestamps to a
//!    [`interval::TimeInterval`], group by sensor or label and produce a
//!    [`chart::Chart`] plus an [`export::ExportTable`]
//!
//! [`pipeline::render`] runs steps 2 and 3 for one [`pipeline::DashboardRequest`]
//! and turns recoverable failures into a user-visible message.
//!
//! # Examples
//!
//! ```
//! use envdash_analysis::{
//!     filter::OutlierFilter,
//!     graph::{ChartKind, GraphRequest},
//!     parameter::Parameter,
//!     pipeline::{DashboardRequest, RenderOutcome, render},
//!     table::SensorTable,
//! };
//!
//! let csv = "\
//! Name,TimeStamp,temperature,#location
//! a,2024-03-01 10:00:00,21.5,kitchen
//! b,2024-03-01 10:01:00,22.5,kitchen
//! c,2024-03-01 10:02:00,18.0,cellar
//! ";
//! let table = SensorTable::from_reader(csv.as_bytes()).unwrap();
//! let request = DashboardRequest {
//!     filter: Some(OutlierFilter::Iqr { multiplier: 1.5 }),
//!     graph: GraphRequest::new(ChartKind::Scatter, Parameter::Temperature).with_label("#location"),
//! };
//! let RenderOutcome::Ready(output) = render(&table, &request) else {
//!     panic!("no data");
//! };
//! assert_eq!(output.chart.title(), "Average Temperature Scatter Plot (Aggregated by 3min)");
//! // kitchen at 10:00 and cellar at 10:03
//! assert_eq!(output.export.len(), 2);
//! ```

pub mod chart;
pub mod export;
pub mod filter;
pub mod graph;
pub mod interval;
pub mod parameter;
pub mod pipeline;
pub mod table;
