// Localized UI strings (English and Chinese)
// Strings ending in _fmt carry `{}` placeholders filled by `fill`

#[derive(Clone)]
pub struct Assets {
    // Menu
    pub menu_help: &'static str,
    pub menu_new: &'static str,
    pub menu_games: &'static str,
    pub menu_records: &'static str,
    pub menu_difficulty: &'static str,
    pub menu_options: &'static str,
    pub menu_about: &'static str,
    pub menu_exit: &'static str,

    // Difficulty names
    pub diff_beginner: &'static str,
    pub diff_intermediate: &'static str,
    pub diff_expert: &'static str,
    pub diff_custom: &'static str,
    pub diff_size_fmt: &'static str, // "{}x{}, {} bombs"

    // Options
    pub opt_show_indicator: &'static str,
    pub opt_ascii_icons: &'static str,
    pub opt_language: &'static str,

    // Help
    pub help_controls: &'static str,
    pub help_move: &'static str,
    pub help_reveal: &'static str,
    pub help_flag: &'static str,
    pub help_games: &'static str,

    // Records
    pub rec_best_time: &'static str,
    pub rec_no_record: &'static str,

    // Sign-in
    pub sign_in_title: &'static str,
    pub sign_in_prompt: &'static str,
    pub sign_in_waiting: &'static str,

    // Recent games
    pub games_title: &'static str,
    pub games_empty: &'static str,
    pub games_won: &'static str,
    pub games_lost: &'static str,
    pub games_playing: &'static str,

    // Win/Loss
    pub win_title: &'static str,
    pub win_message: &'static str,
    pub win_time_fmt: &'static str,
    pub win_time_record_fmt: &'static str,
    pub loss_title: &'static str,
    pub loss_message: &'static str,

    // About
    pub about_description: &'static str,
    pub about_version_fmt: &'static str, // "v{} by {}"
    pub about_server_fmt: &'static str,  // "Server: {}"

    // Status bar
    pub status_fmt: &'static str, // " Bombs: {}   Time: {}s "
    pub status_no_game: &'static str,
    pub error_fmt: &'static str, // "Server: {}"

    pub btn_close: &'static str,

    // Terminal size
    pub tsmsg_line1: &'static str,
    pub tsmsg_line2_fmt: &'static str,
    pub tsmsg_title: &'static str,

    pub lang_english: &'static str,
    pub lang_chinese: &'static str,
}

pub fn english_assets() -> Assets {
    Assets {
        menu_help: "Help",
        menu_new: "New",
        menu_games: "Games",
        menu_records: "Records",
        menu_difficulty: "Difficulty",
        menu_options: "Options",
        menu_about: "About",
        menu_exit: "Exit",

        diff_beginner: "Beginner",
        diff_intermediate: "Intermediate",
        diff_expert: "Expert",
        diff_custom: "Custom",
        diff_size_fmt: "{}x{}, {} bombs",

        opt_show_indicator: "Show indicator",
        opt_ascii_icons: "ASCII icons",
        opt_language: "Language",

        help_controls: " Controls:",
        help_move: "  Arrows  - move cursor",
        help_reveal: "  Space   - reveal",
        help_flag: "  F       - toggle flag",
        help_games: "  F3      - resume a recent game",

        rec_best_time: "Best times",
        rec_no_record: "--",

        sign_in_title: "Sign in",
        sign_in_prompt: "Email:",
        sign_in_waiting: "Enter your email and press Enter",

        games_title: "Recent games",
        games_empty: "No games yet. Press F2 to start one.",
        games_won: "won",
        games_lost: "lost",
        games_playing: "playing",

        win_title: "You win",
        win_message: "Board cleared!",
        win_time_fmt: "Time: {} seconds",
        win_time_record_fmt: "Time: {} seconds (new record!)",
        loss_title: "Boom",
        loss_message: "You uncovered a bomb.",

        about_description: "Minesweeper played against a game server",
        about_version_fmt: "v{} by {}",
        about_server_fmt: "Server: {}",

        status_fmt: " Bombs: {}   Time: {}s ",
        status_no_game: " No game ",
        error_fmt: " Server: {} ",

        btn_close: "Close",

        tsmsg_line1: "Terminal size too small.",
        tsmsg_line2_fmt: "Minimum required: {} x {}",
        tsmsg_title: "Resize Terminal",

        lang_english: "English",
        lang_chinese: "中文",
    }
}

pub fn chinese_assets() -> Assets {
    Assets {
        menu_help: "帮助",
        menu_new: "新游戏",
        menu_games: "对局",
        menu_records: "记录",
        menu_difficulty: "难度",
        menu_options: "选项",
        menu_about: "关于",
        menu_exit: "退出",

        diff_beginner: "初级",
        diff_intermediate: "中级",
        diff_expert: "高级",
        diff_custom: "自定义",
        diff_size_fmt: "{}x{}，{} 个雷",

        opt_show_indicator: "显示指示器",
        opt_ascii_icons: "ASCII 图标",
        opt_language: "语言",

        help_controls: " 操作：",
        help_move: "  方向键  - 移动光标",
        help_reveal: "  空格    - 翻开",
        help_flag: "  F       - 插旗/取消",
        help_games: "  F3      - 继续最近的对局",

        rec_best_time: "最佳时间",
        rec_no_record: "--",

        sign_in_title: "登录",
        sign_in_prompt: "邮箱：",
        sign_in_waiting: "输入邮箱后按回车",

        games_title: "最近的对局",
        games_empty: "还没有对局，按 F2 开始。",
        games_won: "胜利",
        games_lost: "失败",
        games_playing: "进行中",

        win_title: "胜利",
        win_message: "扫雷成功！",
        win_time_fmt: "用时：{} 秒",
        win_time_record_fmt: "用时：{} 秒（新纪录！）",
        loss_title: "爆炸",
        loss_message: "你翻开了一个雷。",

        about_description: "与游戏服务器对战的扫雷",
        about_version_fmt: "v{}，作者 {}",
        about_server_fmt: "服务器：{}",

        status_fmt: " 剩余雷数：{}   时间：{}秒 ",
        status_no_game: " 尚无对局 ",
        error_fmt: " 服务器：{} ",

        btn_close: "关闭",

        tsmsg_line1: "终端窗口太小。",
        tsmsg_line2_fmt: "至少需要：{} x {}",
        tsmsg_title: "调整终端大小",

        lang_english: "English",
        lang_chinese: "中文",
    }
}

/// Replace each `{}` in `fmt` with the next argument
pub fn fill(fmt: &str, args: &[&dyn std::fmt::Display]) -> String {
    let mut out = String::with_capacity(fmt.len() + 8);
    let mut rest = fmt;
    let mut args = args.iter();
    while let Some(pos) = rest.find("{}") {
        out.push_str(&rest[..pos]);
        match args.next() {
            Some(a) => out.push_str(&a.to_string()),
            None => out.push_str("{}"),
        }
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
    out
}

fn normalize(lang_code: &str) -> &'static str {
    if lang_code.to_lowercase().starts_with("zh") {
        "zh"
    } else {
        "en"
    }
}

/// Active language and its strings
pub struct Lang {
    pub current_lang: String,
    pub assets: Assets,
}

impl Lang {
    /// "zh-CN" and friends map to Chinese; everything else to English
    pub fn new(lang_code: &str) -> Self {
        let code = normalize(lang_code);
        Lang {
            current_lang: code.to_string(),
            assets: if code == "zh" { chinese_assets() } else { english_assets() },
        }
    }

    pub fn switch_to(&mut self, lang_code: &str) {
        *self = Lang::new(lang_code);
    }

    /// Next language in the options cycle
    pub fn toggled_code(&self) -> &'static str {
        if self.current_lang == "zh" { "en" } else { "zh" }
    }

    pub fn language_name(&self) -> &'static str {
        if self.current_lang == "zh" {
            self.assets.lang_chinese
        } else {
            self.assets.lang_english
        }
    }

    /// 0=Beginner, 1=Intermediate, 2=Expert, 3=Custom
    pub fn diff_name(&self, index: usize) -> &'static str {
        self.diff_names()[index.min(3)]
    }

    pub fn diff_names(&self) -> [&'static str; 4] {
        [
            self.assets.diff_beginner,
            self.assets.diff_intermediate,
            self.assets.diff_expert,
            self.assets.diff_custom,
        ]
    }

    /// ISO date (YYYY-MM-DD) in the local style
    pub fn format_date(&self, iso_date: &str) -> String {
        let parts: Vec<&str> = iso_date.split('-').collect();
        if parts.len() != 3 {
            return iso_date.to_string();
        }
        if self.current_lang == "zh" {
            format!("{}年{}月{}日", parts[0], parts[1], parts[2])
        } else {
            format!("{}/{}/{}", parts[1], parts[2], parts[0])
        }
    }
}
