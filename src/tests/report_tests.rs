use crate::{
    Deviation, Measurement, MulSymbol, PrintMode, Renderer, ResultMode, ResultValue, Sheet,
    SheetConfig, SheetError, Variable,
};

#[derive(Default)]
struct Recorder {
    math: Vec<String>,
    text: Vec<String>,
}

impl Renderer for Recorder {
    fn render_math(&mut self, latex: &str) {
        self.math.push(latex.to_string());
    }

    fn render_text(&mut self, text: &str) {
        self.text.push(text.to_string());
    }
}

fn volume_sheet(config: SheetConfig) -> Sheet {
    let mut sheet = Sheet::with_config(config);
    sheet.set_equation("a*x**3").unwrap();
    sheet.set_value("a", 0.5, 0.05).unwrap();
    sheet.set_value("x", 2.0, Deviation::Exact).unwrap();
    sheet
}

#[test]
fn test_report_lines() {
    let mut sheet = volume_sheet(SheetConfig::default());
    sheet.set_name("V");
    let report = sheet.report().unwrap();
    assert_eq!(report.equation, r"V=a \cdot x^{3}");
    assert_eq!(report.result, r"V=4.0 \pm 0.4");
    assert_eq!(report.error, r"\sigma_{V}=\sigma_{a} \cdot x^{3}");
}

#[test]
fn test_report_without_name() {
    let mut sheet = volume_sheet(SheetConfig::default());
    let report = sheet.report().unwrap();
    assert_eq!(report.lines(), [r"a \cdot x^{3}", r"4.0 \pm 0.4", r"\sigma_{a} \cdot x^{3}"]);
}

#[test]
fn test_labels_and_mul_symbol() {
    let mut sheet = volume_sheet(SheetConfig::new().mul_symbol(MulSymbol::Times));
    sheet
        .set_variable(
            "a",
            Variable::new().value(0.5).deviation(0.05).label(r"\rho"),
        )
        .unwrap();
    let report = sheet.report().unwrap();
    assert_eq!(report.equation, r"\rho \times x^{3}");
    assert_eq!(report.error, r"\sigma_{\rho} \times x^{3}");
}

#[test]
fn test_print_result_with_renderer() {
    let mut sheet = volume_sheet(SheetConfig::default());
    let mut recorder = Recorder::default();

    let m = sheet
        .print_result(PrintMode::Default, Some(&mut recorder))
        .unwrap();
    assert_eq!(m.nominal, 4.0);
    assert_eq!(recorder.math.len(), 3);
    assert!(recorder.text.is_empty());

    sheet
        .print_result(PrintMode::Short, Some(&mut recorder))
        .unwrap();
    assert_eq!(recorder.text, recorder.math);
}

#[test]
fn test_print_result_without_renderer() {
    let mut sheet = volume_sheet(SheetConfig::default());
    sheet.print_result(PrintMode::Default, None).unwrap();
    sheet.print_result(PrintMode::Default, None).unwrap();
    let warnings: Vec<&str> = sheet
        .messages()
        .warnings()
        .map(|m| m.text.as_str())
        .collect();
    assert_eq!(warnings, vec!["No renderer available to display LaTeX output"]);

    assert!(sheet.print_result(PrintMode::Short, None).is_ok());
    assert!(matches!(
        "long".parse::<PrintMode>(),
        Err(SheetError::UnsupportedMode { .. })
    ));
}

#[test]
fn test_result_modes() {
    let mut sheet = volume_sheet(SheetConfig::default());
    assert_eq!(
        sheet.get_result(ResultMode::Tex(None)).unwrap(),
        ResultValue::Tex(r"4.0 \pm 0.4".to_string())
    );
    assert_eq!(
        sheet.get_result("exact".parse().unwrap()).unwrap(),
        ResultValue::Pair(4.0, 0.4)
    );
    assert!(matches!(
        sheet.get_result(ResultMode::Measurement).unwrap(),
        ResultValue::Measurement(Measurement { nominal, .. }) if nominal == 4.0
    ));
    assert_eq!(
        sheet.get_result(ResultMode::Print).unwrap().as_pair().map(|p| p.0),
        Some(4.0)
    );
    assert!("pdf".parse::<ResultMode>().is_err());
}
