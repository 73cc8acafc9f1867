//! Stats module - Aggregates behind every chart and table

mod calculator;

pub use calculator::{
    AnalysisReport, BoxSummary, Contribution, CorrelationMatrix, DescriptiveStats,
    HeadlineMetrics, MonthlyDistribution, MonthlyMeans, PollutantSeries, RollingMean,
    StatsCalculator, Trendline, YearMonthPivot,
};
