use crate::domain::ports::Pipeline;
use crate::utils::error::Result;

pub struct RedistributionRunner<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> RedistributionRunner<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub fn run(&self) -> Result<String> {
        tracing::info!("Starting redistribution run");

        tracing::debug!("Loading scenario...");
        let input = self.pipeline.extract()?;

        tracing::debug!("Calculating redistribution...");
        let report = self.pipeline.transform(input)?;
        tracing::info!(
            "Redistributed {:.2} over {} item(s), added {:.2}, balanced: {}",
            report.outcome.total_deducted,
            report.outcome.results.len(),
            report.outcome.total_added,
            report.outcome.is_balanced
        );

        tracing::debug!("Writing output...");
        let output_path = self.pipeline.load(report)?;
        tracing::info!("Output saved to: {}", output_path);

        Ok(output_path)
    }
}
