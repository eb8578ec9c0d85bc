// pidstat_report - pidstat Memory Log Analyzer
// Copyright (C) 2025 The pidstat_report contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

/*!
    # pidstat_report

    Offline analyzer for `pidstat -r` memory logs:
    - Parses the per-process log (one target PID) and an optional system memory CSV
    - Prints RSS/VSZ statistics and memory change patterns
    - Renders a two-panel PNG chart (system memory + process RSS)
    - Exports samples and a summary to a 3-sheet `.xlsx` workbook
*/

pub mod analyze;
pub mod chart;
pub mod exectime;
pub mod export;
pub mod pidstat;
pub mod stats;
pub mod style;
pub mod sysmem;
