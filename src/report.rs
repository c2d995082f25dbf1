//! Advisory report generation
//!
//! The report is assembled from an ordered table of independent rules. Each
//! rule has a stable name, a trigger predicate and a text producer; every rule
//! whose predicate holds appends its text, in table order. A request can fire
//! any subset of rules.
//!
//! Sections, in order:
//! 1. Predicted score and sleep-duration analysis
//! 2. Quality assessment
//! 3. Personalized recommendations (conditional tips)
//! 4. Universal sleep tips
//! 5. Morning boosters
//! 6. Closing encouragement

use crate::types::{BmiCategory, Occupation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;

/// Inputs the report rules are evaluated over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportInputs {
    /// Raw predicted sleep-quality score
    pub score: f64,
    /// Sleep duration (hours)
    pub sleep_duration: f64,
    pub stress_level: i32,
    pub activity_level: i32,
    pub age: i32,
    /// Occupation code from the feature table
    pub occupation_code: u8,
    pub bmi_category: BmiCategory,
    pub heart_rate: i32,
    pub systolic_bp: i32,
    pub diastolic_bp: i32,
}

/// Generated report text plus the names of the rules that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepReport {
    pub text: String,
    pub fired_rules: Vec<String>,
}

impl fmt::Display for SleepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// One entry of the rule table
pub struct ReportRule {
    pub name: &'static str,
    pub applies: fn(&ReportInputs) -> bool,
    render: fn(&ReportInputs, &mut String),
}

/// Rule table, evaluated top to bottom
pub static REPORT_RULES: [ReportRule; 18] = [
    ReportRule { name: "header", applies: always, render: render_header },
    ReportRule { name: "duration_band", applies: always, render: render_duration_band },
    ReportRule { name: "quality_band", applies: always, render: render_quality_band },
    ReportRule { name: "recommendations_heading", applies: always, render: render_recommendations_heading },
    ReportRule { name: "earlier_bedtime", applies: short_sleep, render: render_earlier_bedtime },
    ReportRule { name: "power_nap", applies: short_sleep_busy_professional, render: render_power_nap },
    ReportRule { name: "stress_relief", applies: high_stress, render: render_stress_relief },
    ReportRule { name: "gentle_exercise", applies: high_stress_over_50, render: render_gentle_exercise },
    ReportRule { name: "move_more", applies: low_activity, render: render_move_more },
    ReportRule { name: "workout_timing", applies: high_activity, render: render_workout_timing },
    ReportRule { name: "healthcare_worker", applies: healthcare_worker, render: render_healthcare_worker },
    ReportRule { name: "weight_management", applies: overweight, render: render_weight_management },
    ReportRule { name: "heart_health", applies: elevated_heart_rate, render: render_heart_health },
    ReportRule { name: "blood_pressure", applies: elevated_blood_pressure, render: render_blood_pressure },
    ReportRule { name: "universal_tips", applies: always, render: render_universal_tips },
    ReportRule { name: "morning_boosters", applies: always, render: render_morning_boosters },
    ReportRule { name: "dawn_simulator", applies: below_good_quality, render: render_dawn_simulator },
    ReportRule { name: "closing", applies: always, render: render_closing },
];

/// Generator for advisory reports
pub struct ReportGenerator;

impl ReportGenerator {
    /// Evaluate every rule in order and assemble the report
    pub fn generate(inputs: &ReportInputs) -> SleepReport {
        let mut text = String::new();
        let mut fired_rules = Vec::new();

        for rule in REPORT_RULES.iter() {
            if (rule.applies)(inputs) {
                (rule.render)(inputs, &mut text);
                fired_rules.push(rule.name.to_string());
            }
        }

        SleepReport { text, fired_rules }
    }

    /// Look up a rule by name
    pub fn rule(name: &str) -> Option<&'static ReportRule> {
        REPORT_RULES.iter().find(|r| r.name == name)
    }
}

// Predicates

fn always(_: &ReportInputs) -> bool {
    true
}

fn short_sleep(i: &ReportInputs) -> bool {
    i.sleep_duration < 6.0
}

fn short_sleep_busy_professional(i: &ReportInputs) -> bool {
    short_sleep(i)
        && (i.occupation_code == Occupation::Student.code()
            || i.occupation_code == Occupation::Engineer.code())
}

fn high_stress(i: &ReportInputs) -> bool {
    i.stress_level > 6
}

fn high_stress_over_50(i: &ReportInputs) -> bool {
    high_stress(i) && i.age > 50
}

fn low_activity(i: &ReportInputs) -> bool {
    i.activity_level < 4
}

// Exclusive with low_activity by construction
fn high_activity(i: &ReportInputs) -> bool {
    !low_activity(i) && i.activity_level > 7
}

fn healthcare_worker(i: &ReportInputs) -> bool {
    i.occupation_code == Occupation::Doctor.code() || i.occupation_code == Occupation::Nurse.code()
}

fn overweight(i: &ReportInputs) -> bool {
    i.bmi_category == BmiCategory::Overweight
}

fn elevated_heart_rate(i: &ReportInputs) -> bool {
    i.heart_rate > 80
}

fn elevated_blood_pressure(i: &ReportInputs) -> bool {
    i.systolic_bp > 130 || i.diastolic_bp > 85
}

fn below_good_quality(i: &ReportInputs) -> bool {
    i.score < 6.0
}

// Producers

fn render_header(i: &ReportInputs, out: &mut String) {
    let _ = write!(out, "\n🔹 **Predicted Quality of Sleep: {:.1}/10**\n\n", i.score);
    out.push_str("### 🌜 Sleep Analysis Report\n");
}

fn render_duration_band(i: &ReportInputs, out: &mut String) {
    let _ = write!(out, "- **Sleep Duration:** {} hours ", format_hours(i.sleep_duration));
    if i.sleep_duration < 6.0 {
        out.push_str("(⚠️ Below recommended 7-9 hours)\n");
    } else if i.sleep_duration > 9.0 {
        out.push_str("(⚠️ Above recommended amount)\n");
    } else {
        out.push_str("(✅ Optimal duration)\n");
    }
}

fn render_quality_band(i: &ReportInputs, out: &mut String) {
    out.push_str("\n### 🛌 Quality Assessment\n");
    if i.score >= 8.0 {
        out.push_str("- 🌟 Excellent! You're getting restorative sleep\n");
    } else if i.score >= 6.0 {
        out.push_str("- 👍 Good, but room for improvement\n");
    } else {
        out.push_str("- 😟 Needs improvement for better health\n");
    }
}

fn render_recommendations_heading(_: &ReportInputs, out: &mut String) {
    out.push_str("\n### 💡 Personalized Recommendations\n");
}

fn render_earlier_bedtime(_: &ReportInputs, out: &mut String) {
    out.push_str("- 🕘 **Go to bed earlier**: Aim for 7-9 hours nightly\n");
}

fn render_power_nap(_: &ReportInputs, out: &mut String) {
    out.push_str("  - As a busy professional, try power naps (20-30 mins) to supplement\n");
}

fn render_stress_relief(_: &ReportInputs, out: &mut String) {
    out.push_str("- 🧘 **Stress reduction**: Try these before bed:\n");
    out.push_str("  - 4-7-8 breathing technique (inhale 4s, hold 7s, exhale 8s)\n");
    out.push_str("  - Progressive muscle relaxation\n");
}

fn render_gentle_exercise(_: &ReportInputs, out: &mut String) {
    out.push_str("  - Gentle yoga or tai chi can be especially helpful\n");
}

fn render_move_more(_: &ReportInputs, out: &mut String) {
    out.push_str("- 🏃 **Move more**: Aim for at least 30 mins daily activity\n");
    out.push_str("  - Morning walks help regulate circadian rhythm\n");
}

fn render_workout_timing(_: &ReportInputs, out: &mut String) {
    out.push_str("- ⏰ **Timing matters**: Avoid intense workouts within 3 hours of bedtime\n");
}

fn render_healthcare_worker(_: &ReportInputs, out: &mut String) {
    out.push_str("- ⚕️ **For healthcare workers**:\n");
    out.push_str("  - Maintain consistent sleep schedule even on days off\n");
    out.push_str("  - Use blackout curtains for daytime sleeping\n");
}

fn render_weight_management(_: &ReportInputs, out: &mut String) {
    out.push_str("- 🍏 **Weight management**:\n");
    out.push_str("  - Avoid heavy meals before bedtime\n");
    out.push_str("  - Consider sleep apnea screening if you snore\n");
}

fn render_heart_health(_: &ReportInputs, out: &mut String) {
    out.push_str("- ❤️ **Heart health**:\n");
    out.push_str("  - Evening meditation may help lower resting heart rate\n");
}

fn render_blood_pressure(_: &ReportInputs, out: &mut String) {
    out.push_str("- 💓 **Blood Pressure Alert:**\n");
    out.push_str("  - High BP can disrupt sleep. Reduce salt intake and manage stress.\n");
}

fn render_universal_tips(_: &ReportInputs, out: &mut String) {
    out.push_str("\n### 🌙 Universal Sleep Tips\n");
    out.push_str("- 📵 Create a tech-free zone 1 hour before bed\n");
    out.push_str("- 🌡️ Keep bedroom temperature between 60-67°F (15-19°C)\n");
    out.push_str("- 🛏️ Reserve bed only for sleep (no work or TV)\n");
}

fn render_morning_boosters(_: &ReportInputs, out: &mut String) {
    out.push_str("\n### ☀️ Morning Boosters\n");
    out.push_str("- Open curtains immediately upon waking\n");
}

fn render_dawn_simulator(_: &ReportInputs, out: &mut String) {
    out.push_str("- Consider a dawn simulator alarm clock\n");
}

fn render_closing(_: &ReportInputs, out: &mut String) {
    out.push_str("\n💬 Remember: Small consistent changes make the biggest difference!");
}

/// Whole hours keep one decimal ("7.0"), fractional hours print as-is ("6.25")
fn format_hours(hours: f64) -> String {
    if hours.fract() == 0.0 {
        format!("{hours:.1}")
    } else {
        format!("{hours}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn make_rested_inputs() -> ReportInputs {
        ReportInputs {
            score: 8.24,
            sleep_duration: 7.5,
            stress_level: 3,
            activity_level: 5,
            age: 30,
            occupation_code: Occupation::Teacher.code(),
            bmi_category: BmiCategory::Normal,
            heart_rate: 70,
            systolic_bp: 120,
            diastolic_bp: 80,
        }
    }

    fn make_strained_inputs() -> ReportInputs {
        ReportInputs {
            score: 5.0,
            sleep_duration: 4.5,
            stress_level: 8,
            activity_level: 3,
            age: 55,
            occupation_code: Occupation::Student.code(),
            bmi_category: BmiCategory::Overweight,
            heart_rate: 85,
            systolic_bp: 135,
            diastolic_bp: 90,
        }
    }

    #[test]
    fn test_rested_report_text() {
        let report = ReportGenerator::generate(&make_rested_inputs());

        let expected = concat!(
            "\n🔹 **Predicted Quality of Sleep: 8.2/10**\n\n",
            "### 🌜 Sleep Analysis Report\n",
            "- **Sleep Duration:** 7.5 hours (✅ Optimal duration)\n",
            "\n### 🛌 Quality Assessment\n",
            "- 🌟 Excellent! You're getting restorative sleep\n",
            "\n### 💡 Personalized Recommendations\n",
            "\n### 🌙 Universal Sleep Tips\n",
            "- 📵 Create a tech-free zone 1 hour before bed\n",
            "- 🌡️ Keep bedroom temperature between 60-67°F (15-19°C)\n",
            "- 🛏️ Reserve bed only for sleep (no work or TV)\n",
            "\n### ☀️ Morning Boosters\n",
            "- Open curtains immediately upon waking\n",
            "\n💬 Remember: Small consistent changes make the biggest difference!",
        );
        assert_eq!(report.text, expected);
    }

    #[test]
    fn test_strained_report_text() {
        let report = ReportGenerator::generate(&make_strained_inputs());

        let expected = concat!(
            "\n🔹 **Predicted Quality of Sleep: 5.0/10**\n\n",
            "### 🌜 Sleep Analysis Report\n",
            "- **Sleep Duration:** 4.5 hours (⚠️ Below recommended 7-9 hours)\n",
            "\n### 🛌 Quality Assessment\n",
            "- 😟 Needs improvement for better health\n",
            "\n### 💡 Personalized Recommendations\n",
            "- 🕘 **Go to bed earlier**: Aim for 7-9 hours nightly\n",
            "  - As a busy professional, try power naps (20-30 mins) to supplement\n",
            "- 🧘 **Stress reduction**: Try these before bed:\n",
            "  - 4-7-8 breathing technique (inhale 4s, hold 7s, exhale 8s)\n",
            "  - Progressive muscle relaxation\n",
            "  - Gentle yoga or tai chi can be especially helpful\n",
            "- 🏃 **Move more**: Aim for at least 30 mins daily activity\n",
            "  - Morning walks help regulate circadian rhythm\n",
            "- 🍏 **Weight management**:\n",
            "  - Avoid heavy meals before bedtime\n",
            "  - Consider sleep apnea screening if you snore\n",
            "- ❤️ **Heart health**:\n",
            "  - Evening meditation may help lower resting heart rate\n",
            "- 💓 **Blood Pressure Alert:**\n",
            "  - High BP can disrupt sleep. Reduce salt intake and manage stress.\n",
            "\n### 🌙 Universal Sleep Tips\n",
            "- 📵 Create a tech-free zone 1 hour before bed\n",
            "- 🌡️ Keep bedroom temperature between 60-67°F (15-19°C)\n",
            "- 🛏️ Reserve bed only for sleep (no work or TV)\n",
            "\n### ☀️ Morning Boosters\n",
            "- Open curtains immediately upon waking\n",
            "- Consider a dawn simulator alarm clock\n",
            "\n💬 Remember: Small consistent changes make the biggest difference!",
        );
        assert_eq!(report.text, expected);
    }

    #[test]
    fn test_active_nurse_report_text() {
        let inputs = ReportInputs {
            score: 5.46,
            sleep_duration: 5.0,
            stress_level: 8,
            activity_level: 9,
            age: 56,
            occupation_code: Occupation::Nurse.code(),
            bmi_category: BmiCategory::Overweight,
            heart_rate: 88,
            systolic_bp: 140,
            diastolic_bp: 92,
        };
        let report = ReportGenerator::generate(&inputs);

        let expected = concat!(
            "\n🔹 **Predicted Quality of Sleep: 5.5/10**\n\n",
            "### 🌜 Sleep Analysis Report\n",
            "- **Sleep Duration:** 5.0 hours (⚠️ Below recommended 7-9 hours)\n",
            "\n### 🛌 Quality Assessment\n",
            "- 😟 Needs improvement for better health\n",
            "\n### 💡 Personalized Recommendations\n",
            "- 🕘 **Go to bed earlier**: Aim for 7-9 hours nightly\n",
            "- 🧘 **Stress reduction**: Try these before bed:\n",
            "  - 4-7-8 breathing technique (inhale 4s, hold 7s, exhale 8s)\n",
            "  - Progressive muscle relaxation\n",
            "  - Gentle yoga or tai chi can be especially helpful\n",
            "- ⏰ **Timing matters**: Avoid intense workouts within 3 hours of bedtime\n",
            "- ⚕️ **For healthcare workers**:\n",
            "  - Maintain consistent sleep schedule even on days off\n",
            "  - Use blackout curtains for daytime sleeping\n",
            "- 🍏 **Weight management**:\n",
            "  - Avoid heavy meals before bedtime\n",
            "  - Consider sleep apnea screening if you snore\n",
            "- ❤️ **Heart health**:\n",
            "  - Evening meditation may help lower resting heart rate\n",
            "- 💓 **Blood Pressure Alert:**\n",
            "  - High BP can disrupt sleep. Reduce salt intake and manage stress.\n",
            "\n### 🌙 Universal Sleep Tips\n",
            "- 📵 Create a tech-free zone 1 hour before bed\n",
            "- 🌡️ Keep bedroom temperature between 60-67°F (15-19°C)\n",
            "- 🛏️ Reserve bed only for sleep (no work or TV)\n",
            "\n### ☀️ Morning Boosters\n",
            "- Open curtains immediately upon waking\n",
            "- Consider a dawn simulator alarm clock\n",
            "\n💬 Remember: Small consistent changes make the biggest difference!",
        );
        assert_eq!(report.text, expected);
        assert!(report.fired_rules.contains(&"workout_timing".to_string()));
        assert!(!report.fired_rules.contains(&"move_more".to_string()));
    }

    #[test]
    fn test_strained_report_fires_conditional_rules() {
        let report = ReportGenerator::generate(&make_strained_inputs());

        assert_eq!(
            report.fired_rules,
            vec![
                "header",
                "duration_band",
                "quality_band",
                "recommendations_heading",
                "earlier_bedtime",
                "power_nap",
                "stress_relief",
                "gentle_exercise",
                "move_more",
                "weight_management",
                "heart_health",
                "blood_pressure",
                "universal_tips",
                "morning_boosters",
                "dawn_simulator",
                "closing",
            ]
        );
        assert!(report.text.contains("Below recommended 7-9 hours"));
        assert!(report.text.contains("Needs improvement"));
        assert!(report.text.contains("Consider a dawn simulator alarm clock"));
    }

    #[test]
    fn test_sub_tips_follow_their_parent() {
        let text = ReportGenerator::generate(&make_strained_inputs()).text;

        let bedtime = text.find("Go to bed earlier").unwrap();
        let nap = text.find("power naps").unwrap();
        let relaxation = text.find("Progressive muscle relaxation").unwrap();
        let yoga = text.find("Gentle yoga").unwrap();
        let move_more = text.find("Move more").unwrap();

        assert!(bedtime < nap && nap < relaxation);
        assert!(relaxation < yoga && yoga < move_more);
    }

    #[test]
    fn test_report_is_idempotent() {
        let inputs = make_strained_inputs();
        let first = ReportGenerator::generate(&inputs);
        let second = ReportGenerator::generate(&inputs);
        assert_eq!(first, second);
    }

    #[test]
    fn test_duration_bands() {
        let mut inputs = make_rested_inputs();

        inputs.sleep_duration = 9.5;
        assert!(ReportGenerator::generate(&inputs).text.contains("9.5 hours (⚠️ Above recommended amount)"));

        inputs.sleep_duration = 9.0;
        assert!(ReportGenerator::generate(&inputs).text.contains("9.0 hours (✅ Optimal duration)"));

        inputs.sleep_duration = 6.0;
        let report = ReportGenerator::generate(&inputs);
        assert!(report.text.contains("6.0 hours (✅ Optimal duration)"));
        assert!(!report.fired_rules.contains(&"earlier_bedtime".to_string()));
    }

    #[test]
    fn test_quality_bands() {
        let mut inputs = make_rested_inputs();

        inputs.score = 8.0;
        assert!(ReportGenerator::generate(&inputs).text.contains("🌟 Excellent!"));

        inputs.score = 6.0;
        let report = ReportGenerator::generate(&inputs);
        assert!(report.text.contains("👍 Good, but room for improvement"));
        assert!(!report.fired_rules.contains(&"dawn_simulator".to_string()));

        inputs.score = 5.99;
        let report = ReportGenerator::generate(&inputs);
        assert!(report.text.contains("😟 Needs improvement"));
        assert!(report.fired_rules.contains(&"dawn_simulator".to_string()));
    }

    #[test]
    fn test_power_nap_only_for_students_and_engineers() {
        let mut inputs = make_strained_inputs();
        let nap = ReportGenerator::rule("power_nap").unwrap();

        inputs.occupation_code = Occupation::Engineer.code();
        assert!((nap.applies)(&inputs));

        inputs.occupation_code = Occupation::SoftwareEngineer.code();
        assert!(!(nap.applies)(&inputs));

        inputs.occupation_code = Occupation::Student.code();
        inputs.sleep_duration = 7.0;
        assert!(!(nap.applies)(&inputs));
    }

    #[test]
    fn test_gentle_exercise_needs_age_over_50() {
        let mut inputs = make_strained_inputs();
        let rule = ReportGenerator::rule("gentle_exercise").unwrap();

        inputs.age = 50;
        assert!(!(rule.applies)(&inputs));
        inputs.age = 51;
        assert!((rule.applies)(&inputs));
        inputs.stress_level = 6;
        assert!(!(rule.applies)(&inputs));
    }

    #[test]
    fn test_activity_rules_are_exclusive() {
        let move_more = ReportGenerator::rule("move_more").unwrap();
        let timing = ReportGenerator::rule("workout_timing").unwrap();
        let mut inputs = make_rested_inputs();

        for level in 0..=10 {
            inputs.activity_level = level;
            let fired = [(move_more.applies)(&inputs), (timing.applies)(&inputs)];
            assert!(!(fired[0] && fired[1]));
            assert_eq!(fired[0], level < 4);
            assert_eq!(fired[1], level > 7);
        }
    }

    #[test]
    fn test_healthcare_worker_tips() {
        let mut inputs = make_rested_inputs();
        let rule = ReportGenerator::rule("healthcare_worker").unwrap();

        inputs.occupation_code = Occupation::Doctor.code();
        assert!((rule.applies)(&inputs));
        inputs.occupation_code = Occupation::Nurse.code();
        assert!((rule.applies)(&inputs));
        inputs.occupation_code = Occupation::Scientist.code();
        assert!(!(rule.applies)(&inputs));
    }

    #[test]
    fn test_blood_pressure_thresholds_are_strict() {
        let rule = ReportGenerator::rule("blood_pressure").unwrap();
        let mut inputs = make_rested_inputs();

        inputs.systolic_bp = 130;
        inputs.diastolic_bp = 85;
        assert!(!(rule.applies)(&inputs));

        inputs.systolic_bp = 131;
        assert!((rule.applies)(&inputs));

        inputs.systolic_bp = 120;
        inputs.diastolic_bp = 86;
        assert!((rule.applies)(&inputs));
    }

    #[test]
    fn test_heart_rate_and_weight_rules() {
        let mut inputs = make_rested_inputs();

        inputs.heart_rate = 80;
        assert!(!(ReportGenerator::rule("heart_health").unwrap().applies)(&inputs));
        inputs.heart_rate = 81;
        assert!((ReportGenerator::rule("heart_health").unwrap().applies)(&inputs));

        let weight = ReportGenerator::rule("weight_management").unwrap();
        assert!(!(weight.applies)(&inputs));
        inputs.bmi_category = BmiCategory::Overweight;
        assert!((weight.applies)(&inputs));
    }

    #[test]
    fn test_rule_names_are_unique() {
        let mut names: Vec<_> = REPORT_RULES.iter().map(|r| r.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), REPORT_RULES.len());
    }

    #[test]
    fn test_format_hours() {
        assert_eq!(format_hours(7.0), "7.0");
        assert_eq!(format_hours(4.5), "4.5");
        assert_eq!(format_hours(6.25), "6.25");
    }
}
