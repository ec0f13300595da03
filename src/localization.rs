use color_print::cstr;
use prompter_lib::audit::ReportLabels;

pub enum Language {
    English,
    Russian,
}

pub struct Localization<'a> {
    // About message and templates
    pub about_msg: &'a str,
    pub help_template: &'a str,
    pub subcommand_help_template: &'a str,

    // Command descriptions
    pub missing_command_desc: &'a str,
    pub extract_command_desc: &'a str,
    pub apply_command_desc: &'a str,
    pub restore_command_desc: &'a str,
    pub audit_command_desc: &'a str,
    pub validate_command_desc: &'a str,
    pub scan_command_desc: &'a str,
    pub duplicates_command_desc: &'a str,
    pub patch_command_desc: &'a str,

    // Argument descriptions
    pub input_dir_arg_desc: &'a str,
    pub reference_arg_desc: &'a str,
    pub output_dir_arg_desc: &'a str,
    pub config_arg_desc: &'a str,
    pub language_arg_desc: &'a str,

    pub log_arg_desc: &'a str,
    pub help_arg_desc: &'a str,
    pub version_flag_desc: &'a str,

    pub file_arg_desc: &'a str,
    pub json_flag_desc: &'a str,
    pub summary_flag_desc: &'a str,
    pub save_flag_desc: &'a str,
    pub report_arg_desc: &'a str,
    pub queue_arg_desc: &'a str,
    pub text_only_flag_desc: &'a str,
    pub stats_flag_desc: &'a str,
    pub dry_run_flag_desc: &'a str,
    pub no_backup_flag_desc: &'a str,
    pub verbose_flag_desc: &'a str,
    pub strict_flag_desc: &'a str,
    pub threshold_arg_desc: &'a str,
    pub rules_arg_desc: &'a str,

    // Argument types
    pub input_path_arg_type: &'a str,
    pub output_path_arg_type: &'a str,
    pub file_path_arg_type: &'a str,
    pub file_filter_arg_type: &'a str,
    pub language_arg_type: &'a str,
    pub threshold_arg_type: &'a str,

    // Messages
    pub elapsed_time_msg: &'a str,
    pub no_subcommand_specified_msg: &'a str,
    pub fatal_error_msg: &'a str,
    pub no_files_found_msg: &'a str,
    pub no_issues_msg: &'a str,
    pub report_saved_msg: &'a str,
    pub queue_written_msg: &'a str,
    pub queue_total_msg: &'a str,
    pub lines_inserted_msg: &'a str,
    pub lines_would_insert_msg: &'a str,
    pub dry_run_msg: &'a str,
    pub backup_msg: &'a str,
    pub passages_checked_msg: &'a str,
    pub passages_changed_msg: &'a str,
    pub commands_restored_msg: &'a str,
    pub duplicates_removed_msg: &'a str,
    pub files_changed_msg: &'a str,
    pub speakers_renamed_msg: &'a str,
    pub replacements_msg: &'a str,
    pub replacements_missed_msg: &'a str,
    pub quotes_normalized_msg: &'a str,
    pub empty_rules_msg: &'a str,
    pub report_labels: ReportLabels<'a>,

    // Misc
    pub possible_values: &'a str,
    pub example: &'a str,
    pub default_value: &'a str,
}

impl Localization<'_> {
    pub const fn new(language: Language) -> Self {
        match language {
            Language::English => Self::init_en(),
            Language::Russian => Self::init_ru(),
        }
    }

    const fn init_en() -> Self {
        Localization {
            // About message and templates
            about_msg: cstr!(
                r#"<bold>This tool keeps translated passage files in step with their reference dump. It finds lines the translation dropped, turns them into a translation queue, inserts the translated queue back at the right places, and runs format checks over the translated files.</>"#
            ),
            help_template: cstr!(
                "{about}\n\n<underline,bold>Usage:</> prompter-txt-rs COMMAND [OPTIONS]\n\n<underline,bold>Commands:</>\n{subcommands}\n\n<underline,bold>Options:</>\n{options}"
            ),
            subcommand_help_template: cstr!(
                "{about}\n\n<underline,bold>Usage:</> {usage}\n\n<underline,bold>Options:</>\n{options}"
            ),

            // Command descriptions
            missing_command_desc: cstr!(
                r#"<bold>Aligns every translated passage with its reference passage and reports the reference lines that have no counterpart.</>"#
            ),
            extract_command_desc: cstr!(
                r#"<bold>Turns a missing lines report into a pipe-delimited translation queue.</>"#
            ),
            apply_command_desc: cstr!(
                r#"<bold>Inserts the translated queue lines into the passage files, in front of the next line that is already in place.</>"#
            ),
            restore_command_desc: cstr!(
                r#"<bold>Rebuilds passage structure from the reference: restores lost engine commands, drops duplicated lines and moves choices to the end.</>"#
            ),
            audit_command_desc: cstr!(
                r#"<bold>Compares every translated passage with the reference and reports structural problems.</>"#
            ),
            validate_command_desc: cstr!(
                r#"<bold>Checks the format of the translated files without the reference.</>"#
            ),
            scan_command_desc: cstr!(r#"<bold>Looks for known choice bugs.</>"#),
            duplicates_command_desc: cstr!(
                r#"<bold>Reports nearly identical content lines that stand close to each other inside a passage.</>"#
            ),
            patch_command_desc: cstr!(
                r#"<bold>Applies a TOML file of replacement rules to the translated files.</>"#
            ),

            // Argument descriptions
            input_dir_arg_desc: "Directory with the translated passage files.",
            reference_arg_desc: "Reference passage dump.",
            output_dir_arg_desc: "Directory where reports and the translation queue are written.",
            config_arg_desc: "Configuration file. prompter.toml from the working directory is used when it exists.",
            language_arg_desc: "Sets the localization of the tool to the selected language.",

            log_arg_desc: "Enables debug logging. RUST_LOG takes precedence.",
            help_arg_desc: "Prints the program's help message or for the entered subcommand.",
            version_flag_desc: "Prints the program's version.",

            file_arg_desc: "Processes only the files whose name, without the suffix, contains this text.",
            json_flag_desc: "Prints the report as JSON.",
            summary_flag_desc: "Prints a table with one row per file instead of the full report.",
            save_flag_desc: "Also writes missing_lines.json into the output directory.",
            report_arg_desc: "Missing lines report to read. Defaults to missing_lines.json in the output directory.",
            queue_arg_desc: "Translation queue to read. Defaults to lines_to_translate.txt in the output directory.",
            text_only_flag_desc: "Keeps only missing text, leaving commands and logic out.",
            stats_flag_desc: "Prints line counts per category without writing the queue.",
            dry_run_flag_desc: "Shows what would change without writing anything.",
            no_backup_flag_desc: "Does not create .bak copies of modified files.",
            verbose_flag_desc: "Prints every changed passage.",
            strict_flag_desc: "Also warns about unknown emotes and unquoted speaker lines.",
            threshold_arg_desc: "Similarity ratio above which two lines count as duplicates.",
            rules_arg_desc: "TOML file with replacement rules.",

            // Argument types
            input_path_arg_type: "INPUT_PATH",
            output_path_arg_type: "OUTPUT_PATH",
            file_path_arg_type: "FILE",
            file_filter_arg_type: "NAME",
            language_arg_type: "LANGUAGE",
            threshold_arg_type: "RATIO",

            // Messages
            elapsed_time_msg: "Elapsed time:",
            no_subcommand_specified_msg: "No command was specified. Call prompter-txt-rs -h for help.",
            fatal_error_msg: "Error:",
            no_files_found_msg: "No translated files found.",
            no_issues_msg: "No issues found.",
            report_saved_msg: "Report saved to",
            queue_written_msg: "Translation queue written to",
            queue_total_msg: "Lines in queue:",
            lines_inserted_msg: "Lines inserted:",
            lines_would_insert_msg: "Lines that would be inserted:",
            dry_run_msg: "Dry run, no files were changed.",
            backup_msg: "Original files were kept as .bak copies.",
            passages_checked_msg: "Passages checked:",
            passages_changed_msg: "Passages changed:",
            commands_restored_msg: "Commands restored:",
            duplicates_removed_msg: "Duplicates removed:",
            files_changed_msg: "Files changed:",
            speakers_renamed_msg: "Speakers renamed:",
            replacements_msg: "Replacements:",
            replacements_missed_msg: "Replacements not found:",
            quotes_normalized_msg: "Quotes normalized:",
            empty_rules_msg: "The rule file contains no rules.",
            report_labels: ReportLabels::ENGLISH,

            // Misc
            possible_values: "Allowed values:",
            example: "Example:",
            default_value: "Default value:",
        }
    }

    const fn init_ru() -> Self {
        Localization {
            about_msg: cstr!(
                r#"<bold>Инструмент, позволяющий поддерживать файлы перевода в соответствии с исходным дампом. Программа находит строки, потерянные при переводе, собирает из них очередь на перевод, вставляет переведённую очередь обратно на нужные места и проверяет формат файлов перевода.</>"#
            ),
            help_template: cstr!(
                "{about}\n\n<underline,bold>Использование:</> prompter-txt-rs КОМАНДА [ОПЦИИ]\n\n<underline,bold>Команды:</>\n{subcommands}\n\n<underline,bold>Опции:</>\n{options}"
            ),
            subcommand_help_template: cstr!(
                "{about}\n\n<underline,bold>Использование:</> {usage}\n\n<underline,bold>Опции:</>\n{options}"
            ),

            missing_command_desc: cstr!(
                r#"<bold>Сопоставляет каждый переведённый пассаж с исходным и выводит строки оригинала, у которых нет соответствия.</>"#
            ),
            extract_command_desc: cstr!(
                r#"<bold>Превращает отчёт о пропущенных строках в очередь на перевод, разделённую символом |.</>"#
            ),
            apply_command_desc: cstr!(
                r#"<bold>Вставляет переведённые строки очереди в файлы пассажей перед следующей строкой, которая уже стоит на месте.</>"#
            ),
            restore_command_desc: cstr!(
                r#"<bold>Восстанавливает структуру пассажей по оригиналу: возвращает потерянные команды движка, удаляет дубликаты и переносит выборы в конец.</>"#
            ),
            audit_command_desc: cstr!(
                r#"<bold>Сравнивает каждый переведённый пассаж с оригиналом и выводит структурные проблемы.</>"#
            ),
            validate_command_desc: cstr!(
                r#"<bold>Проверяет формат файлов перевода без использования оригинала.</>"#
            ),
            scan_command_desc: cstr!(r#"<bold>Ищет известные ошибки в выборах.</>"#),
            duplicates_command_desc: cstr!(
                r#"<bold>Выводит почти одинаковые строки текста, стоящие рядом внутри пассажа.</>"#
            ),
            patch_command_desc: cstr!(
                r#"<bold>Применяет к файлам перевода TOML файл с правилами замены.</>"#
            ),

            input_dir_arg_desc: "Директория с файлами перевода.",
            reference_arg_desc: "Исходный дамп пассажей.",
            output_dir_arg_desc: "Директория, в которую записываются отчёты и очередь на перевод.",
            config_arg_desc: "Файл конфигурации. Если в рабочей директории есть prompter.toml, используется он.",
            language_arg_desc: "Устанавливает локализацию инструмента на выбранный язык.",

            log_arg_desc: "Включает отладочное логирование. RUST_LOG имеет приоритет.",
            help_arg_desc: "Выводит справочную информацию по программе либо по введёной команде.",
            version_flag_desc: "Выводит версию программы.",

            file_arg_desc: "Обрабатывает только файлы, имя которых без суффикса содержит этот текст.",
            json_flag_desc: "Выводит отчёт в формате JSON.",
            summary_flag_desc: "Выводит таблицу, по одной строке на файл, вместо полного отчёта.",
            save_flag_desc: "Дополнительно записывает missing_lines.json в выходную директорию.",
            report_arg_desc: "Отчёт о пропущенных строках. По умолчанию missing_lines.json в выходной директории.",
            queue_arg_desc: "Очередь на перевод. По умолчанию lines_to_translate.txt в выходной директории.",
            text_only_flag_desc: "Оставляет только пропущенный текст, без команд и логики.",
            stats_flag_desc: "Выводит количество строк по категориям, не записывая очередь.",
            dry_run_flag_desc: "Показывает изменения, ничего не записывая.",
            no_backup_flag_desc: "Не создаёт копии .bak изменяемых файлов.",
            verbose_flag_desc: "Выводит каждый изменённый пассаж.",
            strict_flag_desc: "Также предупреждает о неизвестных эмоциях и репликах без кавычек.",
            threshold_arg_desc: "Степень сходства, выше которой две строки считаются дубликатами.",
            rules_arg_desc: "TOML файл с правилами замены.",

            input_path_arg_type: "ВХОДНОЙ_ПУТЬ",
            output_path_arg_type: "ВЫХОДНОЙ_ПУТЬ",
            file_path_arg_type: "ФАЙЛ",
            file_filter_arg_type: "ИМЯ",
            language_arg_type: "ЯЗЫК",
            threshold_arg_type: "ДОЛЯ",

            elapsed_time_msg: "Затраченное время:",
            no_subcommand_specified_msg: "Команда не была указана. Вызовите prompter-txt-rs -h для помощи.",
            fatal_error_msg: "Ошибка:",
            no_files_found_msg: "Файлы перевода не найдены.",
            no_issues_msg: "Проблем не найдено.",
            report_saved_msg: "Отчёт сохранён в",
            queue_written_msg: "Очередь на перевод записана в",
            queue_total_msg: "Строк в очереди:",
            lines_inserted_msg: "Вставлено строк:",
            lines_would_insert_msg: "Будет вставлено строк:",
            dry_run_msg: "Пробный запуск, файлы не изменены.",
            backup_msg: "Исходные файлы сохранены в копиях .bak.",
            passages_checked_msg: "Проверено пассажей:",
            passages_changed_msg: "Изменено пассажей:",
            commands_restored_msg: "Восстановлено команд:",
            duplicates_removed_msg: "Удалено дубликатов:",
            files_changed_msg: "Изменено файлов:",
            speakers_renamed_msg: "Переименовано говорящих:",
            replacements_msg: "Замен:",
            replacements_missed_msg: "Не найдено замен:",
            quotes_normalized_msg: "Исправлено кавычек:",
            empty_rules_msg: "Файл правил не содержит правил.",
            report_labels: ReportLabels {
                reference: "оригинал",
                target: "перевод",
                missing: "пропущено",
                before: "до:",
                after: "после:",
                passages_with_missing: "Пассажей с пропущенными строками:",
                missing_lines: "Пропущено строк:",
                file: "ФАЙЛ",
                passages: "ПАССАЖИ",
                total: "ИТОГО",
                errors: "ошибок",
                warnings: "предупреждений",
                files_checked: "Проверено файлов:",
                files_with_issues: "Файлов с проблемами:",
                total_errors: "Всего ошибок:",
                total_warnings: "Всего предупреждений:",
            },

            possible_values: "Разрешённые значения:",
            example: "Пример:",
            default_value: "Значение по умолчанию:",
        }
    }
}
