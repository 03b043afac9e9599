//! Sectioned block shared by the game stores.

use super::{Description, score_line};
use crate::models::{Record, Role};

pub(super) fn render(record: &Record) -> String {
    let mut d = Description::new();
    d.image(record.poster.as_deref())
        .raw("【基本信息】\n\n")
        .line("名称: ", record.this_title.join(" / "))
        .line("译名: ", record.trans_title.join(" / "))
        .line("类型: ", record.genres.join(" / "))
        .line("开发商: ", record.credited(Role::Developer).join(" / "))
        .line("发行商: ", record.credited(Role::Publisher).join(" / "))
        .line("发行日期: ", record.release_dates.join(" / "))
        .line("平台: ", record.platforms.join(" / "))
        .line("语言: ", record.languages.join(" / "))
        .line("标签: ", record.tags.join(" | "))
        .line(
            "官方网站: ",
            record.official_site.as_deref().unwrap_or_default(),
        )
        .line("商店页面: ", record.link.as_deref().unwrap_or_default());
    if let Some(rating) = record.rating(record.site) {
        d.always("评分: ", score_line(Some(rating.score), Some(rating.votes)));
    }

    if let Some(synopsis) = record.synopsis.as_deref().filter(|s| !s.is_empty()) {
        d.raw(&format!("\n【游戏简介】\n\n{synopsis}\n"));
    }
    if let Some(requirements) = record.requirements.as_deref().filter(|s| !s.is_empty()) {
        d.raw(&format!("\n【配置需求】\n\n{requirements}\n"));
    }
    if !record.screenshots.is_empty() {
        d.raw("\n【游戏截图】\n\n");
        for shot in &record.screenshots {
            d.raw(&format!("[img]{shot}[/img]\n"));
        }
    }
    d.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Site;

    #[test]
    fn renders_basic_info_and_sections() {
        let mut record = Record::new(Site::Steam, "620");
        record.link = Some("https://store.steampowered.com/app/620/".to_string());
        record.this_title = vec!["Portal 2".to_string()];
        record.genres = vec!["动作".to_string(), "冒险".to_string()];
        record.push_credit(Role::Developer, vec!["Valve".to_string()]);
        record.release_dates = vec!["2011 年 4 月 18 日".to_string()];
        record.synopsis = Some("传送门".to_string());
        record.requirements = Some("最低配置:\n操作系统: Windows 7".to_string());
        record.screenshots = vec!["https://cdn/1.jpg".to_string(), "https://cdn/2.jpg".to_string()];

        let expected = "【基本信息】\n\
\n\
名称: Portal 2\n\
类型: 动作 / 冒险\n\
开发商: Valve\n\
发行日期: 2011 年 4 月 18 日\n\
商店页面: https://store.steampowered.com/app/620/\n\
\n\
【游戏简介】\n\
\n\
传送门\n\
\n\
【配置需求】\n\
\n\
最低配置:\n操作系统: Windows 7\n\
\n\
【游戏截图】\n\
\n\
[img]https://cdn/1.jpg[/img]\n\
[img]https://cdn/2.jpg[/img]\n";

        assert_eq!(render(&record.succeed()), expected);
    }

    #[test]
    fn native_rating_line_follows_the_rating() {
        let mut record = Record::new(Site::Steam, "620");
        assert!(!render(&record).contains("评分"));
        record.push_rating(Site::Steam, 9.0, 300_000);
        assert!(render(&record).contains("评分: 9/10 from 300000 users\n"));
    }
}
