//! The built-in monthly reporting workflow.

use super::definition::{ExpectedInput, FileFormat, StepDefinition, StepKind};

/// Steps of the monthly FP&A reporting workflow, in run order.
pub fn reporting_steps() -> Vec<StepDefinition> {
    vec![
        StepDefinition::new("step-1", StepKind::Input, 1000)
            .with_name("Marketing Slides")
            .with_subtitle("Input • PowerPoint")
            .with_description("Marketing presentation used as input")
            .with_input(ExpectedInput::new(
                "Marketing_Slides.pptx",
                FileFormat::PowerPoint,
            ))
            .with_logs(&[
                "Loading Marketing Slides...",
                "Reading Marketing_Slides.pptx",
                "✓ Parsed 24 slides",
                "✓ Extracted text and images",
                "Marketing slides loaded successfully",
            ]),
        StepDefinition::new("step-2", StepKind::Input, 1000)
            .with_name("Cashflow Excel")
            .with_subtitle("Input • Excel")
            .with_description("Cashflow data")
            .with_input(ExpectedInput::new("Cashflow_Data.xlsx", FileFormat::Excel))
            .with_logs(&[
                "Loading Cashflow Excel...",
                "Reading Cashflow_Data.xlsx",
                "✓ Parsed 156 rows, 8 columns",
                "✓ Validated financial formulas",
                "Cashflow data loaded successfully",
            ]),
        StepDefinition::new("step-3", StepKind::Input, 1000)
            .with_name("Reporting Template")
            .with_subtitle("Input • PowerPoint")
            .with_description("PowerPoint reporting template")
            .with_input(ExpectedInput::new(
                "Reporting_Template.pptx",
                FileFormat::PowerPoint,
            ))
            .with_logs(&[
                "Loading Reporting Template...",
                "Reading Reporting_Template.pptx",
                "✓ Identified 12 data sections",
                "✓ Mapped placeholder fields",
                "Template loaded successfully",
            ]),
        StepDefinition::new("step-6", StepKind::Input, 1000)
            .with_name("Reporting Excel")
            .with_subtitle("Input • Excel")
            .with_description("Excel reporting template")
            .with_input(ExpectedInput::new(
                "Reporting_Template.xlsx",
                FileFormat::Excel,
            ))
            .with_logs(&[
                "Loading Reporting Excel...",
                "Reading Reporting_Template.xlsx",
                "✓ Parsed 45 rows, 12 columns",
                "✓ Mapped data fields",
                "Reporting Excel loaded successfully",
            ]),
        StepDefinition::new("step-4", StepKind::CoherenceCheck, 3000)
            .with_name("Coherence Check")
            .with_subtitle("AI Process • Coherence")
            .with_description("Validate the marketing slide data")
            .with_prompt(
                "Check slide structure, detect missing sections and data consistency",
            )
            .with_depends_on(&["step-1"])
            .with_logs(&[
                "Coherence Check 1: Marketing Slides...",
                "Validating slide structure...",
                "✓ All required sections present",
                "✓ Data consistency verified",
                "Coherence check 1 passed",
            ]),
        StepDefinition::new("step-5", StepKind::CoherenceCheck, 3000)
            .with_name("Coherence Check")
            .with_subtitle("AI Process • Coherence")
            .with_description("Validate the cashflow data")
            .with_prompt(
                "Validate financial calculations, check balance integrity and detect anomalies",
            )
            .with_depends_on(&["step-2"])
            .with_logs(&[
                "Coherence Check 2: Cashflow Data...",
                "Validating cashflow calculations...",
                "✓ Balance checks passed",
                "✓ No data anomalies detected",
                "Coherence check 2 passed",
            ]),
        StepDefinition::new("step-6b", StepKind::CoherenceCheck, 3000)
            .with_name("Coherence Check")
            .with_subtitle("AI Process • Coherence")
            .with_description("Validate the Excel reporting template")
            .with_prompt(
                "Validate template fields, check format consistency and placeholder mapping",
            )
            .with_depends_on(&["step-6"])
            .with_logs(&[
                "Coherence Check 3: Reporting Excel...",
                "Validating template fields...",
                "✓ All placeholders validated",
                "✓ Format consistency confirmed",
                "Coherence check 3 passed",
            ]),
        StepDefinition::new("step-7", StepKind::AiProcessing, 5000)
            .with_name("Fill Reporting Excel")
            .with_subtitle("AI Process • Fill")
            .with_description("AI fills the reporting template with the validated data")
            .with_prompt(
                "Map cashflow data to the template, fill metrics, update charts and recalculate formulas",
            )
            .with_depends_on(&["step-4", "step-5", "step-6b"])
            .with_logs(&[
                "Filling Reporting Excel...",
                "Mapping cashflow data to template...",
                "✓ Financial metrics populated",
                "✓ Charts and graphs updated",
                "✓ Formulas recalculated",
                "Reporting Excel filled successfully",
            ]),
        StepDefinition::new("step-8", StepKind::AiProcessing, 5000)
            .with_name("Fill Reporting Slides")
            .with_subtitle("AI Process • Presentation")
            .with_description("AI generates the presentation slides")
            .with_prompt(
                "Generate the executive summary, build data visualisations and format the deck",
            )
            .with_depends_on(&["step-3", "step-7"])
            .with_logs(&[
                "Filling Reporting Slides...",
                "Combining marketing slides with data...",
                "✓ Data visualizations created",
                "✓ Executive summary generated",
                "✓ Slides formatted and styled",
                "Presentation slides completed",
            ]),
        StepDefinition::new("step-9", StepKind::CoherenceCheck, 3000)
            .with_name("Coherence Check")
            .with_subtitle("AI Process • Final validation")
            .with_description("Final validation of the generated presentation")
            .with_prompt("Verify data accuracy, formatting consistency and every requirement")
            .with_depends_on(&["step-8"])
            .with_logs(&[
                "Final Coherence Check...",
                "Validating complete presentation...",
                "✓ Data accuracy verified",
                "✓ Formatting consistency confirmed",
                "✓ All requirements met",
                "Final coherence check passed",
            ]),
        StepDefinition::new("step-10", StepKind::Output, 2000)
            .with_name("Export Presentation")
            .with_subtitle("Output • PowerPoint")
            .with_description("Export the final presentation")
            .with_depends_on(&["step-9"])
            .with_logs(&[
                "Exporting Final Presentation...",
                "Compiling presentation file...",
                "✓ Generated: FPA_Report.pptx",
                "✓ File size: 3.2 MB",
                "Export completed successfully",
            ]),
    ]
}
