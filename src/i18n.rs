/// Simple localization support for OrangeConverter's terminal output.
/// Locale can be selected via the `--locale` CLI flag (e.g. `--locale zh`).
/// Job log lines come from the engine and are not translated.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Zh,
}

impl Locale {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "zh" | "zh-cn" | "zh_cn" | "zh-hans" | "zh-tw" | "zh_tw" => Self::Zh,
            _ => Self::En,
        }
    }
}

pub struct Messages {
    pub job_started: &'static str,
    pub job_finished: &'static str,
    pub summary_header: &'static str,
    pub status_done: &'static str,
    pub status_failed: &'static str,
    pub overall_label: &'static str,
    pub error_prefix: &'static str,
    pub log_prefix: &'static str,
    pub job_prefix: &'static str,
    pub tool_found: &'static str,
    pub tool_missing: &'static str,
}

pub static EN: Messages = Messages {
    job_started: "Job started",
    job_finished: "Job finished",
    summary_header: "Summary",
    status_done: "done",
    status_failed: "failed",
    overall_label: "overall",
    error_prefix: "ERR",
    log_prefix: "LOG",
    job_prefix: "JOB",
    tool_found: "found",
    tool_missing: "missing",
};

pub static ZH: Messages = Messages {
    job_started: "任务已启动",
    job_finished: "任务已完成",
    summary_header: "摘要",
    status_done: "完成",
    status_failed: "失败",
    overall_label: "总进度",
    error_prefix: "错误",
    log_prefix: "日志",
    job_prefix: "任务",
    tool_found: "已找到",
    tool_missing: "未找到",
};

pub fn get_messages(locale: Locale) -> &'static Messages {
    match locale {
        Locale::En => &EN,
        Locale::Zh => &ZH,
    }
}
